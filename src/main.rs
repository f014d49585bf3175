// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

#![no_main]
#![no_std]

use core::cell::Cell;
use core::convert::Infallible;

use cortex_m::peripheral::syst::SystClkSource;
use cortex_m_rt::{entry, exception};
use critical_section::Mutex;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin};
use log::{info, warn, LevelFilter};
use panic_halt as _;

use hal::{
    gpio::{Output, Pin, PushPull},
    pac::{self, interrupt},
    prelude::*,
    serial::{Config, Serial},
};
use stm32f7xx_hal as hal;

use mcboard::config::{BaudWindow, GateDriverConfig};
use mcboard::hw::{ChipEnable, SerialLogger, ServiceTick, Usart, Usart2Channel};
use mcboard::{Board, BoardService, FaultLine};

/// Board-service period in SysTick ticks (1 ms each).
const SERVICE_PERIOD: u16 = 1;

/// nFAULT from the gate driver, on PC14 (EXTI14, falling edge).
const FAULT_EXTI_LINE: u32 = 14;

/// Gate-driver CE on PC13, active high.
struct CePin(Pin<'C', 13, Output<PushPull>>);

impl ErrorType for CePin {
    type Error = Infallible;
}

impl OutputPin for CePin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.set_low();
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.set_high();
        Ok(())
    }
}

/// Busy-wait delay counted in core cycles.
struct CycleDelay {
    sysclk_hz: u32,
}

impl DelayNs for CycleDelay {
    fn delay_ns(&mut self, ns: u32) {
        let cycles = (ns as u64 * self.sysclk_hz as u64) / 1_000_000_000;
        cortex_m::asm::delay(cycles.max(1) as u32);
    }
}

static CHIP_ENABLE: ChipEnable<CePin> = ChipEnable::new();
static SERVICE_TICK: ServiceTick = ServiceTick::new(SERVICE_PERIOD);
static FAULT_LINE: Mutex<Cell<Option<FaultLine<'static, CePin>>>> = Mutex::new(Cell::new(None));
static SYSCLK_HZ: Mutex<Cell<u32>> = Mutex::new(Cell::new(0));

#[entry]
fn main() -> ! {
    // Peripherals
    let Some(dp) = pac::Peripherals::take() else {
        panic!("peripherals already taken");
    };
    let Some(mut cp) = cortex_m::Peripherals::take() else {
        panic!("core peripherals already taken");
    };

    // Clocks
    let rcc = dp.RCC.constrain();
    let clocks = rcc.cfgr.sysclk(216.MHz()).freeze();
    let sysclk = clocks.sysclk().raw();
    let pclk1 = clocks.pclk1().raw();

    // GPIO
    let gpioa = dp.GPIOA.split();
    let gpioc = dp.GPIOC.split();
    let gpiod = dp.GPIOD.split();

    // USART1 (DBG)
    let tx = gpioa.pa9.into_alternate::<7>();
    let rx = gpioa.pa10.into_alternate::<7>();
    let usart_cfg = Config {
        baud_rate: 115_200.bps(),
        ..Default::default()
    };
    let serial = Serial::new(dp.USART1, (tx, rx), &clocks, usart_cfg);
    SerialLogger::install(Usart::new(serial), LevelFilter::Info);

    // USART2 (gate driver link, single wire on PD5)
    let _link_tx = gpiod.pd5.into_alternate::<7>();
    let _link_rx = gpiod.pd6.into_alternate::<7>();
    let channel = Usart2Channel::new(dp.USART2);

    // CE
    let ce = CePin(gpioc.pc13.into_push_pull_output());
    if CHIP_ENABLE.bind(ce).is_err() {
        panic!("chip enable bound twice");
    }

    // nFAULT
    let _fault = gpioc.pc14.into_pull_up_input();
    enable_fault_interrupt();

    // SysTick @ 1 kHz
    cp.SYST.set_clock_source(SystClkSource::Core);
    cp.SYST.set_reload(sysclk / 1_000 - 1);
    cp.SYST.clear_current();
    cp.SYST.enable_counter();
    cp.SYST.enable_interrupt();

    let config = GateDriverConfig {
        baud: BaudWindow::from_divisor_fn(|bps| (pclk1 / bps) as u16),
        ..Default::default()
    };
    let board = Board::new(channel, &CHIP_ENABLE, config);

    critical_section::with(|cs| {
        FAULT_LINE.borrow(cs).set(Some(board.fault_line()));
        SYSCLK_HZ.borrow(cs).set(sysclk);
    });
    unsafe { cortex_m::peripheral::NVIC::unmask(pac::Interrupt::EXTI15_10) };

    info!("mcboard: up, sysclk {} Hz, pclk1 {} Hz", sysclk, pclk1);

    let mut service = BoardService::new(board);
    loop {
        if service.poll(&SERVICE_TICK).is_none() {
            cortex_m::asm::wfi();
        }
    }
}

/// Route PC14 to EXTI14 on the falling edge.
fn enable_fault_interrupt() {
    let rcc = unsafe { &*pac::RCC::ptr() };
    rcc.apb2enr.modify(|_, w| w.syscfgen().set_bit());

    // EXTICR4[11:8] = port C
    let syscfg = unsafe { &*pac::SYSCFG::ptr() };
    syscfg
        .exticr4
        .modify(|r, w| unsafe { w.bits((r.bits() & !(0xF << 8)) | (0b0010 << 8)) });

    let exti = unsafe { &*pac::EXTI::ptr() };
    exti.ftsr.modify(|r, w| unsafe { w.bits(r.bits() | (1 << FAULT_EXTI_LINE)) });
    exti.imr.modify(|r, w| unsafe { w.bits(r.bits() | (1 << FAULT_EXTI_LINE)) });
}

#[exception]
fn SysTick() {
    SERVICE_TICK.step();
}

#[interrupt]
fn EXTI15_10() {
    let exti = unsafe { &*pac::EXTI::ptr() };
    exti.pr.write(|w| unsafe { w.bits(1 << FAULT_EXTI_LINE) });

    let (line, sysclk_hz) =
        critical_section::with(|cs| (FAULT_LINE.borrow(cs).get(), SYSCLK_HZ.borrow(cs).get()));
    if let Some(line) = line {
        if let Err(err) = line.clear(&mut CycleDelay { sysclk_hz }) {
            warn!("mcboard: fault clear failed: {}", err);
        }
    }
}

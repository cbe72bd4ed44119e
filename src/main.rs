// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Drive firmware: brings up SPI4 with both L6470s and runs the operator console on USART1.
//!
//! The console loop runs until the board is reset. A stop request (`s`) runs the shutdown
//! sequence and parks the core; it is the only way out of the loop. If either chip cannot be
//! initialized the console never starts and the core is parked with the bridges released.

#![no_main]
#![no_std]

use core::fmt::Write;

use cortex_m::delay::Delay;
use cortex_m_rt::entry;
use defmt_rtt as _;
use embedded_hal::delay::DelayNs;
use panic_halt as _;

use hal::{
    pac,
    prelude::*,
    serial::{self, Config, Serial},
    spi::Spi,
};
use stm32f7xx_hal as hal;

use twinstep::control::{DifferentialDrive, RampOutcome};
use twinstep::drivers::{ChannelTransport, Duplex, InitProfile};
use twinstep::hw::{board, ChipSelect, DualChannelSpi, SpiBus, SysDelay, Usart, UsartRx};
use twinstep::motors::AxisPair;
use twinstep::protocol::{messages::HELP, messages::REQ_STOP, ConsoleRequest, Echo, Parser};
use twinstep::{DriveConfig, Error};

/// What the console loop does after a request.
enum Flow {
    Continue,
    Exit,
}

#[entry]
fn main() -> ! {
    // Peripherals
    let dp = pac::Peripherals::take().unwrap();
    let cp = cortex_m::Peripherals::take().unwrap();

    // Clocks
    let rcc = dp.RCC.constrain();
    let clocks = rcc.cfgr.sysclk(216.MHz()).freeze();
    let mut apb2 = rcc.apb2;

    // GPIO
    let gpioa = dp.GPIOA.split();
    let gpioe = dp.GPIOE.split();

    // USART1 (console)
    let tx = gpioa.pa9.into_alternate::<7>();
    let rx = gpioa.pa10.into_alternate::<7>();
    let usart_cfg = Config {
        baud_rate: board::USART_BAUD.bps(),
        ..Default::default()
    };
    let serial = Serial::new(dp.USART1, (tx, rx), &clocks, usart_cfg);
    let (mut usart, mut console_rx) = Usart::new(serial);

    usart.println("***** twinstep drive *****");

    // SPI4, one L6470 per chip select
    let sck = gpioe.pe12.into_alternate::<5>();
    let miso = gpioe.pe13.into_alternate::<5>();
    let mosi = gpioe.pe14.into_alternate::<5>();
    let spi4 = Spi::new(dp.SPI4, (sck, miso, mosi)).enable::<u8>(
        board::SPI_MODE,
        board::SPI_FREQ_HZ.Hz(),
        &clocks,
        &mut apb2,
    );
    let cs0 = ChipSelect::active_low(gpioe.pe4);
    let cs1 = ChipSelect::active_low(gpioe.pe11);
    let bus = DualChannelSpi::new(SpiBus::new(spi4), cs0, cs1);

    // SysTick delay
    let delay = SysDelay::new(Delay::new(cp.SYST, clocks.sysclk().raw()));

    let mut drive = DifferentialDrive::new(
        ChannelTransport::new(bus),
        delay,
        AxisPair::default(),
        DriveConfig::default(),
    );

    if let Err(e) = drive.initialize(&InitProfile::default()) {
        defmt::error!("L6470 init failed");
        let _ = write!(usart, "L6470 init failed: {:?}\r\n", e);
        let _ = drive.emergency_stop();
        park(&mut usart);
    }
    defmt::info!("both L6470 channels initialized");

    for line in HELP {
        usart.println(line);
    }

    let mut parser = Parser::new();
    loop {
        let Some(byte) = console_rx.read_byte() else {
            continue;
        };
        let Some(parsed) = parser.push(byte) else {
            continue;
        };

        let request = match parsed {
            Ok(request) => request,
            Err(e) => {
                let _ = write!(usart, "? {}\r\n", e);
                for line in HELP {
                    usart.println(line);
                }
                continue;
            }
        };

        match handle(&mut drive, request, &mut usart, &mut console_rx) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Exit) => break,
            Err(e) => {
                let _ = write!(usart, "motion error: {:?}\r\n", e);
                if drive.emergency_stop().is_err() {
                    usart.println("emergency stop failed");
                }
            }
        }
    }

    park(&mut usart)
}

/// Flush the console and halt until reset.
fn park<U: serial::Instance>(usart: &mut Usart<U>) -> ! {
    usart.flush();
    loop {
        cortex_m::asm::wfi();
    }
}

/// Apply one console request to the drive and echo the result.
fn handle<B, D, U>(
    drive: &mut DifferentialDrive<B, D>,
    request: ConsoleRequest,
    usart: &mut Usart<U>,
    console_rx: &mut UsartRx<U>,
) -> Result<Flow, Error<B::Error>>
where
    B: Duplex,
    D: DelayNs,
    U: serial::Instance,
{
    defmt::debug!("console request {}", request);

    match request {
        ConsoleRequest::SpeedUp => {
            let speed = drive.speed_up()?;
            echo(usart, Echo::Speed(speed));
        }
        ConsoleRequest::SpeedDown => {
            let speed = drive.speed_down()?;
            echo(usart, Echo::Speed(speed));
        }
        ConsoleRequest::RampTo { speed, slope_us } => {
            let outcome = drive.ramp_to_with(
                speed,
                slope_us,
                stop_key(console_rx),
                |left, right| echo_step(usart, left, right),
            )?;
            if let RampOutcome::Aborted { at } = outcome {
                echo(usart, Echo::RampAborted(at));
                return stop(drive, usart);
            }
        }
        ConsoleRequest::RampSides {
            left,
            right,
            slope_us,
        } => {
            let outcome = drive.ramp_sides_to_with(
                left,
                right,
                slope_us,
                stop_key(console_rx),
                |left, right| echo_step(usart, left, right),
            )?;
            if let RampOutcome::Aborted { at } = outcome {
                echo(usart, Echo::RampAborted(at));
                return stop(drive, usart);
            }
        }
        ConsoleRequest::MoveSteps(steps) => {
            let microsteps = drive.move_full_steps(steps)?;
            echo(usart, Echo::Microsteps(microsteps));
        }
        ConsoleRequest::SetLeft(speed) => {
            let (_, right) = drive.side_speeds();
            let (l, r) = drive.set_side_speeds(speed, right)?;
            echo(usart, Echo::Sides(l, r));
        }
        ConsoleRequest::SetRight(speed) => {
            let (left, _) = drive.side_speeds();
            let (l, r) = drive.set_side_speeds(left, speed)?;
            echo(usart, Echo::Sides(l, r));
        }
        ConsoleRequest::Stop => return stop(drive, usart),
    }
    Ok(Flow::Continue)
}

fn stop<B, D, U>(
    drive: &mut DifferentialDrive<B, D>,
    usart: &mut Usart<U>,
) -> Result<Flow, Error<B::Error>>
where
    B: Duplex,
    D: DelayNs,
    U: serial::Instance,
{
    echo(usart, Echo::Speed(0));
    drive.shutdown()?;
    echo(usart, Echo::Stopped);
    Ok(Flow::Exit)
}

fn echo<U: serial::Instance>(usart: &mut Usart<U>, line: Echo) {
    let _ = write!(usart, "{}\r\n", line);
}

/// Ramp abort predicate: true once the stop key arrives on the console. Other bytes are dropped.
fn stop_key<U: serial::Instance>(console_rx: &mut UsartRx<U>) -> impl FnMut() -> bool + '_ {
    let stop = REQ_STOP.as_bytes().first().copied();
    move || console_rx.read_byte().is_some_and(|b| Some(b) == stop)
}

/// Echo one ramp step: a single value while both sides match, both sides otherwise.
fn echo_step<U: serial::Instance>(usart: &mut Usart<U>, left: i32, right: i32) {
    if left == right {
        echo(usart, Echo::RampStep(left));
    } else {
        echo(usart, Echo::Sides(left, right));
    }
}

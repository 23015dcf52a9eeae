#![no_std]
#![no_main]

use core::arch::global_asm;

use hartirq_common::board::TICK_FREQ;
use hartirq_common::mmio::GPIO0_BASE;
use hartirq_core::com::{self, ComSink};

#[cfg(not(feature = "diagnostics"))]
use panic_halt as _;

mod console;
mod drivers;
mod hw;
mod isr;
mod kernel;
mod trap;

use drivers::gpio::Leds;

global_asm!(include_str!("entry.S"));

static LEDS: Leds = Leds::new(GPIO0_BASE);

#[cfg(feature = "com-uart")]
static COM: console::Uart = console::Uart;
#[cfg(not(feature = "com-uart"))]
static COM: com::Disabled = com::Disabled;

/// Entry point for hart 0, called from `_start` with a stack and zeroed
/// `.bss`. Other harts are parked in `entry.S`.
#[unsafe(no_mangle)]
pub extern "C" fn kmain() -> ! {
    console::init(if cfg!(feature = "diagnostics") {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    });
    console::println!("hartirq: booting hart 0");

    LEDS.init();
    if let Err(err) = isr::init_hw() {
        console::println!("interrupt bring-up failed: {}", err);
        idle(false);
    }

    // Exercise the software interrupt path once; the handler acknowledges it.
    hw::raise_software_interrupt();

    idle(true)
}

/// Waits for the next interrupt. Without `idle-wfi` the hart busy-waits.
#[inline(always)]
fn idle_wait() {
    #[cfg(feature = "idle-wfi")]
    unsafe {
        riscv::asm::wfi()
    };
    #[cfg(not(feature = "idle-wfi"))]
    core::hint::spin_loop();
}

/// Background loop: once per second of ticks toggles LED 0 and sends a
/// heartbeat over the debug channel.
fn idle(running: bool) -> ! {
    let mut last_second = 0;
    loop {
        idle_wait();
        if !running {
            continue;
        }
        let second = kernel::ticks() / u64::from(TICK_FREQ);
        if second == last_second {
            continue;
        }
        last_second = second;
        LEDS.toggle(0);

        if !com::tx_active() {
            LEDS.set(1);
            com::set_tx_active();
            COM.send(b"\xA5");
            com::clear_tx_active();
            LEDS.clear(1);
        }
        log::debug!(
            "up {}s, {} cycles, {} rx bytes, tick pending {}, depth {}",
            second,
            kernel::time_cycles().unwrap_or(0),
            drivers::uart::rx_count(),
            kernel::tick_pending(),
            isr::nesting_depth()
        );
    }
}

#[cfg(feature = "diagnostics")]
#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    console::println!("PANIC: {}", info);
    loop {
        idle_wait();
    }
}

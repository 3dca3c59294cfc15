//! Standalone wall-clock/CPU-time microbenchmark utility.
//!
//! A faithful port of the original `gettime.c`: runs a fixed-iteration
//! floating-point workload, timing it both by wall clock and by process CPU
//! time, then prints elapsed/CPU/utilization. Not part of the coordinator
//! loop (SPEC_FULL.md §4.13, C13) — a standalone sanity check for the host
//! machine before a run.

use std::mem::MaybeUninit;
use std::time::Instant;

const ITERATIONS: u64 = 50_000_000;

/// The workload itself: mirrors `gettime.c`'s `calculate()`, a tight
/// floating-point loop with no I/O so the timing reflects raw CPU throughput.
fn calculate(iterations: u64) -> f64 {
    let mut acc = 0.0_f64;
    for i in 0..iterations {
        let x = i as f64;
        acc += (x.sin() * x.cos()) / (x + 1.0);
    }
    acc
}

/// Process CPU time (user + system), via `getrusage(2)`. Best-effort: the
/// coordinator never relies on this utility's output for anything but a
/// human-read diagnostic, so a failed syscall just reports zero.
fn cpu_time_seconds() -> f64 {
    let mut usage = MaybeUninit::<libc::rusage>::zeroed();
    let rc = unsafe { libc::getrusage(libc::RUSAGE_SELF, usage.as_mut_ptr()) };
    if rc != 0 {
        return 0.0;
    }
    let usage = unsafe { usage.assume_init() };
    let user = usage.ru_utime.tv_sec as f64 + usage.ru_utime.tv_usec as f64 / 1_000_000.0;
    let sys = usage.ru_stime.tv_sec as f64 + usage.ru_stime.tv_usec as f64 / 1_000_000.0;
    user + sys
}

fn main() {
    let wall_start = Instant::now();
    let cpu_start = cpu_time_seconds();

    let result = calculate(ITERATIONS);

    let wall_elapsed = wall_start.elapsed().as_secs_f64();
    let cpu_elapsed = cpu_time_seconds() - cpu_start;

    println!("plads-timing: {ITERATIONS} iterations, result (ignore) = {result:.6}");
    println!("wall clock:   {wall_elapsed:.6}s");
    println!("cpu time:     {cpu_elapsed:.6}s");
    if wall_elapsed > 0.0 {
        println!("utilization:  {:.2}%", (cpu_elapsed / wall_elapsed) * 100.0);
    }
}

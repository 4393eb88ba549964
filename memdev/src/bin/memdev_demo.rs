//! MemDev Demo
//!
//! Attaches a device, walks through the read/write/seek/clear protocol and
//! then lets a few threads write disjoint slices concurrently.
//!
//! Usage: `memdev_demo [config.json]`

use memdev::{DeviceConfig, MemDevice, MEM_CLEAR, SEEK_SET};
use std::thread;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => DeviceConfig::from_slice(&std::fs::read(path)?)?,
        None => DeviceConfig::default(),
    };
    let device = MemDevice::attach(config)?;
    println!("Attached {device:?}");

    let fd = device.open();

    let n = device.write(fd, b"hello, memdev")?;
    println!("({fd}) written {n} byte(s)");

    device.llseek(fd, 0, SEEK_SET)?;
    let mut buf = [0u8; 16];
    let n = device.read(fd, &mut buf)?;
    println!("({fd}) read {n} byte(s): {:?}", String::from_utf8_lossy(&buf[..n]));

    device.ioctl(fd, MEM_CLEAR)?;
    let n = device.read(fd, &mut buf)?;
    println!("({fd}) after clear: {:?}", &buf[..n]);

    if let Err(e) = device.ioctl(fd, 0x2) {
        println!("({fd}) ioctl 0x2 rejected: {e} (errno {})", e.errno());
    }

    let offset = i64::try_from(device.capacity())? + 1;
    if let Err(e) = device.llseek(fd, offset, SEEK_SET) {
        println!("({fd}) seek to {offset} rejected: {e}");
    }

    device.close(fd)?;

    // Each writer owns an 8-byte slice filled with its own letter
    thread::scope(|scope| {
        let writers: Vec<_> = (b'a'..=b'd')
            .enumerate()
            .map(|(i, letter)| {
                let device = &device;
                scope.spawn(move || -> Result<usize, memdev::DeviceError> {
                    let fd = device.open();
                    #[allow(clippy::cast_possible_wrap)]
                    device.llseek(fd, (i * 8) as i64, SEEK_SET)?;
                    let n = device.write(fd, &[letter; 8])?;
                    device.close(fd)?;
                    Ok(n)
                })
            })
            .collect();

        for (i, writer) in writers.into_iter().enumerate() {
            match writer.join() {
                Ok(Ok(n)) => println!("(writer {i}) written {n} byte(s)"),
                Ok(Err(e)) => eprintln!("(writer {i}) error: {e}"),
                Err(_) => eprintln!("(writer {i}) panicked"),
            }
        }
    });

    let guard = device.buffer().lock();
    let shown = &guard[..guard.len().min(32)];
    println!("Concurrent writers: {}", String::from_utf8_lossy(shown));
    drop(guard);

    device.detach();
    Ok(())
}

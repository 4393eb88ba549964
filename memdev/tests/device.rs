use memdev::{
    Access, ConfigError, DeviceConfig, DeviceError, Handle, MemDevice, MEM_CLEAR, SEEK_CUR,
    SEEK_SET,
};
use std::thread;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn device(capacity: usize) -> MemDevice {
    init_tracing();
    MemDevice::attach(DeviceConfig::with_capacity(capacity)).unwrap()
}

#[test]
fn test_attach_defaults() {
    init_tracing();
    let device = MemDevice::attach(DeviceConfig::default()).unwrap();
    assert_eq!(device.name(), "simple_chr");
    assert_eq!(device.capacity(), 4096);
    assert_eq!(device.config().major, 0);
    assert_eq!(device.open_sessions(), 0);
    assert!(device.buffer().lock().iter().all(|&b| b == 0));
}

#[test]
fn test_attach_zero_capacity_fails() {
    let result = MemDevice::attach(DeviceConfig::with_capacity(0));
    assert!(matches!(result, Err(ConfigError::InvalidCapacity)));
}

#[test]
fn test_open_returns_distinct_handles() {
    let device = device(16);
    let fd1 = device.open();
    let fd2 = device.open();
    assert_ne!(fd1, fd2);
    assert_eq!(device.open_sessions(), 2);

    device.close(fd1).unwrap();
    assert_eq!(device.open_sessions(), 1);
    device.close(fd2).unwrap();
    assert_eq!(device.open_sessions(), 0);
}

#[test]
fn test_close_unknown_handle() {
    let device = device(16);
    let fd = device.open();
    device.close(fd).unwrap();

    let err = device.close(fd).unwrap_err();
    assert_eq!(err, DeviceError::UnknownSession(fd));
    assert_eq!(err.errno(), 9);

    let mut buf = [0u8; 1];
    assert_eq!(
        device.read(Handle::new(999), &mut buf),
        Err(DeviceError::UnknownSession(Handle::new(999)))
    );
}

#[test]
fn test_reference_scenario_through_host() {
    let device = device(8);
    let fd = device.open();

    assert_eq!(device.write(fd, b"ABCD").unwrap(), 4);
    assert_eq!(device.llseek(fd, 0, SEEK_SET).unwrap(), 0);

    let mut buf = [0u8; 8];
    assert_eq!(device.read(fd, &mut buf).unwrap(), 8);
    assert_eq!(&buf, b"ABCD\0\0\0\0");

    device.ioctl(fd, MEM_CLEAR).unwrap();
    let mut buf = [0xffu8; 8];
    assert_eq!(device.read(fd, &mut buf).unwrap(), 8);
    assert_eq!(buf, [0u8; 8]);

    let err = device.llseek(fd, 9, SEEK_SET).unwrap_err();
    assert!(matches!(
        err,
        DeviceError::OutOfRange {
            op: Access::Seek,
            offset: 9,
            capacity: 8
        }
    ));
    assert_eq!(err.errno(), 22);
    // Cursor stayed at the end after the full read
    assert_eq!(device.read(fd, &mut buf).unwrap(), 0);
}

#[test]
fn test_sessions_have_independent_cursors() {
    let device = device(8);
    let writer = device.open();
    let reader = device.open();

    device.write(writer, b"abcdef").unwrap();
    assert_eq!(device.llseek(reader, 2, SEEK_SET).unwrap(), 2);
    assert_eq!(device.llseek(reader, 1, SEEK_CUR).unwrap(), 3);

    let mut buf = [0u8; 2];
    assert_eq!(device.read(reader, &mut buf).unwrap(), 2);
    assert_eq!(&buf, b"de");

    assert_eq!(device.llseek(writer, 0, SEEK_CUR).unwrap(), 6);
}

#[test]
fn test_unsupported_whence_and_ioctl() {
    let device = device(8);
    let fd = device.open();
    device.write(fd, b"ab").unwrap();

    let err = device.llseek(fd, 0, 2).unwrap_err();
    assert_eq!(err, DeviceError::UnsupportedSeek(2));
    assert_eq!(err.errno(), 22);

    let err = device.ioctl(fd, 0x2).unwrap_err();
    assert_eq!(err, DeviceError::UnsupportedCommand(0x2));
    assert_eq!(err.errno(), 22);

    assert_eq!(device.llseek(fd, 0, SEEK_CUR).unwrap(), 2);
    assert_eq!(&device.buffer().lock()[..2], b"ab");
}

#[test]
fn test_write_at_capacity_errno() {
    let device = device(4);
    let fd = device.open();
    assert_eq!(device.write(fd, b"abcdef").unwrap(), 4);

    let err = device.write(fd, b"g").unwrap_err();
    assert_eq!(err.errno(), 6);
}

#[test]
fn test_concurrent_host_writers() {
    let device = device(64);

    thread::scope(|scope| {
        for i in 0..4u8 {
            let device = &device;
            scope.spawn(move || {
                let fd = device.open();
                device.llseek(fd, i64::from(i) * 16, SEEK_SET).unwrap();
                assert_eq!(device.write(fd, &[b'a' + i; 16]).unwrap(), 16);
                device.close(fd).unwrap();
            });
        }
    });

    let guard = device.buffer().lock();
    for (i, chunk) in guard.chunks(16).enumerate() {
        let expected = b'a' + u8::try_from(i).unwrap();
        assert!(chunk.iter().all(|&b| b == expected));
    }
    drop(guard);
    assert_eq!(device.open_sessions(), 0);
}

#[test]
fn test_detach_with_open_sessions() {
    let device = device(8);
    let _fd = device.open();
    assert_eq!(
        format!("{device:?}"),
        "MemDevice(name=simple_chr, capacity=8, sessions=1)"
    );
    device.detach();
}

use canraw::util::bytes_equal;
use canraw::{CanId, CanTransport, Config};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // receive our own frame back so it can be compared with what was sent
    let config = Config::from_env()?.recv_own_msgs(true);
    let mut bus = CanTransport::with_config(&config)?;

    let data: [u8; 4] = [222, 173, 190, 239];
    let id = CanId::standard(123)?;
    bus.set_filter(id)?;

    match bus.write_frame(&data, id) {
        Ok(()) => log::debug!("Frame Send Success"),
        Err(e) => {
            log::debug!("Frame Send Error {}", e);
            return Err(e.into());
        }
    }

    let mut buf = [0u8; 8];
    let (valid, len, got) = bus.try_read_frame(&mut buf)?;
    if valid && got == id && bytes_equal(&buf[..len], &data) {
        log::info!("loopback matched {:X}", got);
    } else {
        log::warn!("loopback mismatch: valid={} id={:X} data={:?}", valid, got, &buf[..len]);
    }

    bus.close()?;
    Ok(())
}

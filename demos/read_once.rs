use canraw::{CanTransport, Config, ShouldRetry};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = Config::from_env()?;
    let mut bus = CanTransport::with_config(&config)?;
    let mut buf = [0u8; 8];

    loop {
        match bus.try_read_frame(&mut buf) {
            Ok((true, len, id)) => log::info!("{:X}#{}", id, hex::encode(&buf[..len])),
            Ok((false, _, id)) => log::debug!("skipped invalid frame {:#010x}", id.raw()),
            Err(ref e) if e.should_retry() => log::trace!("read timed out"),
            Err(e) => {
                log::debug!("Error: {}", e);
                break;
            }
        }
    }

    Ok(())
}

use candle_core::Device;
use tracing::{debug, warn};

#[cfg(any(feature = "metal", feature = "cuda"))]
use tracing::info;

/// Selects the compute device for capability inference.
///
/// GPU backends are tried in feature order (Metal, then CUDA); any failure
/// falls back to CPU. Device selection itself never fails.
pub fn select_device() -> Device {
    #[cfg(feature = "metal")]
    match Device::new_metal(0) {
        Ok(device) => {
            info!("Using Metal GPU acceleration");
            return device;
        }
        Err(e) => {
            warn!(error = %e, "Metal device unavailable");
        }
    }

    #[cfg(feature = "cuda")]
    match Device::new_cuda(0) {
        Ok(device) => {
            info!("Using CUDA GPU acceleration");
            return device;
        }
        Err(e) => {
            warn!(error = %e, "CUDA device unavailable");
        }
    }

    if cfg!(any(feature = "metal", feature = "cuda")) {
        warn!("No GPU device available, falling back to CPU");
    } else {
        debug!("No GPU backend compiled, using CPU");
    }

    Device::Cpu
}

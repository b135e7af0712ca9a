#[cfg(test)]
mod tests {
	use {
		app::{global::*, log},
		std::{fs, io::Write, path::Path, time::Duration},
		tracing::{error, trace},
	};

	extern crate journey_planning_policy as app;

	/// Verifies that `logs/latest.log` is created and written to from log events.
	#[test]
	fn test_logger() {
		unsafe {
			std::env::set_var("RUST_LOG", "warn,journey_planning_policy=debug");
		}
		let latest_log_path = Path::new(LOG_DIR).join(LATEST_LOG);
		_ = fs::remove_file(latest_log_path.as_path());
		log::init_logger();
		trace!("Test trace");
		error!("Test error");
		log::log_writer().flush().unwrap();
		std::thread::sleep(Duration::from_millis(10));
		let logs = fs::read_to_string(latest_log_path).unwrap();
		assert!(logs.len() > 0);
	}

	/// Verifies that `logs/crash.log` is created and written to on a panic.
	#[test]
	fn test_panic_handler() {
		let crash_log_path = Path::new(LOG_DIR).join(CRASH_LOG);
		_ = fs::remove_file(crash_log_path.as_path());
		log::init_panic_handler();
		std::panic::catch_unwind(|| {
			panic!("Test panic");
		})
		.unwrap_err();
		assert!(fs::read_to_string(crash_log_path).unwrap().len() > 0);
	}
}

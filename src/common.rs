// Licensed under the Apache-2.0 license

//! Crate-wide helpers shared by the SMBus driver modules.
//!
//! Logging is done through the [`Logger`] trait so that drivers can be
//! instantiated without any output device ([`NoOpLogger`]) or wired to a
//! byte sink such as a debug UART ([`WriterLogger`]).

use core::fmt;
use embedded_io::Write;

/// Minimal logging sink used by the driver components.
///
/// Messages are passed as [`fmt::Arguments`] so implementations can format
/// straight into their output without allocating.
pub trait Logger {
    fn debug(&mut self, args: fmt::Arguments<'_>);
    fn error(&mut self, args: fmt::Arguments<'_>);
}

/// Logger that discards everything. This is the default for every
/// component that takes a logger type parameter.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpLogger;

impl Logger for NoOpLogger {
    fn debug(&mut self, _args: fmt::Arguments<'_>) {}
    fn error(&mut self, _args: fmt::Arguments<'_>) {}
}

impl<T: Logger + ?Sized> Logger for &mut T {
    fn debug(&mut self, args: fmt::Arguments<'_>) {
        T::debug(self, args);
    }

    fn error(&mut self, args: fmt::Arguments<'_>) {
        T::error(self, args);
    }
}

/// Logger writing one line per message to an [`embedded_io::Write`] sink.
///
/// Lines are terminated with `\r\n` so the output reads correctly on a
/// serial terminal. Write failures are dropped; logging never fails a
/// bus transaction.
pub struct WriterLogger<W: Write> {
    writer: W,
    debug_enabled: bool,
}

impl<W: Write> WriterLogger<W> {
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            debug_enabled: true,
        }
    }

    /// Only emit error lines.
    #[must_use]
    pub fn errors_only(mut self) -> Self {
        self.debug_enabled = false;
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Logger for WriterLogger<W> {
    fn debug(&mut self, args: fmt::Arguments<'_>) {
        if self.debug_enabled {
            let _ = write!(self.writer, "[DEBUG] {args}\r\n");
        }
    }

    fn error(&mut self, args: fmt::Arguments<'_>) {
        let _ = write!(self.writer, "[ERROR] {args}\r\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;

    #[derive(Default)]
    struct Sink(Vec<u8>);

    impl embedded_io::ErrorType for Sink {
        type Error = Infallible;
    }

    impl embedded_io::Write for Sink {
        fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
            self.0.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    #[test]
    fn test_writer_logger_formats_lines() {
        let mut logger = WriterLogger::new(Sink::default());
        logger.debug(format_args!("bus {} start", 1));
        logger.error(format_args!("failed: {:#04x}", 0x50));

        let out = String::from_utf8(logger.into_inner().0).unwrap();
        assert_eq!(out, "[DEBUG] bus 1 start\r\n[ERROR] failed: 0x50\r\n");
    }

    #[test]
    fn test_errors_only_suppresses_debug() {
        let mut logger = WriterLogger::new(Sink::default()).errors_only();
        logger.debug(format_args!("hidden"));
        logger.error(format_args!("shown"));

        let out = String::from_utf8(logger.into_inner().0).unwrap();
        assert_eq!(out, "[ERROR] shown\r\n");
    }

    #[test]
    fn test_logger_by_mut_ref() {
        fn log_via<L: Logger>(mut logger: L) {
            logger.error(format_args!("x"));
        }

        let mut inner = WriterLogger::new(Sink::default());
        log_via(&mut inner);
        assert_eq!(inner.into_inner().0, b"[ERROR] x\r\n");
    }
}

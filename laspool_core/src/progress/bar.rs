//! A small terminal progress bar: message, bar, pos/len, percentage, rate
//! and ETA, redrawn at most a few times per second.

use parking_lot::Mutex;
use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};

const REDRAW_INTERVAL: Duration = Duration::from_millis(250);

struct Inner {
	message: String,
	len: u64,
	pos: u64,
	start: Instant,
	last_draw: Option<Instant>,
	finished: bool,
}

impl Inner {
	fn redraw(&mut self) {
		if !self.finished
			&& self
				.last_draw
				.is_some_and(|last| last.elapsed() < REDRAW_INTERVAL)
		{
			return;
		}
		self.last_draw = Some(Instant::now());

		// Only draw on a real terminal; redirected runs stay quiet.
		let Some((width, _)) = terminal_size::terminal_size_of(std::io::stderr()) else {
			return;
		};

		let len = self.len.max(1);
		let pos = self.pos.min(len);
		let elapsed = self.start.elapsed().as_secs_f64();
		let rate = if elapsed > 0.0 { pos as f64 / elapsed } else { 0.0 };
		let eta = if pos > 0 {
			Duration::from_secs_f64(elapsed * (len - pos) as f64 / pos as f64)
		} else {
			Duration::ZERO
		};
		let percent = (pos as f64 * 100.0 / len as f64).floor() as u64;

		let suffix = format!(
			" {pos}/{len} {percent:>3}% {:>7} eta {}",
			format_rate(rate),
			format_eta(eta)
		);
		let reserved = self.message.chars().count() + suffix.chars().count() + 3;
		let bar_width = (width.0 as usize).saturating_sub(reserved).max(10);
		let line = format!("{} [{}]{}", self.message, make_bar(pos, len, bar_width), suffix);

		let mut stderr = std::io::stderr();
		let _ = write!(stderr, "\r\x1b[2K{line}");
		let _ = stderr.flush();
	}

	fn clear_line(&self) {
		if terminal_size::terminal_size_of(std::io::stderr()).is_none() {
			return;
		}
		let mut stderr = std::io::stderr();
		let _ = write!(stderr, "\r\x1b[2K");
		let _ = stderr.flush();
	}
}

/// A cloneable, thread-safe progress bar handle.
#[derive(Clone)]
pub struct ProgressBar {
	inner: Arc<Mutex<Inner>>,
}

impl ProgressBar {
	/// Creates a bar with a message and a maximum value.
	pub fn new(message: &str, len: u64) -> ProgressBar {
		ProgressBar {
			inner: Arc::new(Mutex::new(Inner {
				message: message.to_string(),
				len,
				pos: 0,
				start: Instant::now(),
				last_draw: None,
				finished: false,
			})),
		}
	}

	/// Updates the maximum value, clamping the position to it.
	pub fn set_len(&self, len: u64) {
		let mut inner = self.inner.lock();
		inner.len = len;
		inner.pos = inner.pos.min(len);
		inner.redraw();
	}

	/// Sets the absolute position.
	pub fn set_position(&self, value: u64) {
		let mut inner = self.inner.lock();
		inner.pos = value.min(inner.len);
		inner.redraw();
	}

	/// Increments the position by `value`.
	pub fn inc(&self, value: u64) {
		let mut inner = self.inner.lock();
		inner.pos = inner.pos.saturating_add(value).min(inner.len);
		inner.redraw();
	}

	/// Completes the bar and prints a final newline.
	pub fn finish(&self) {
		let mut inner = self.inner.lock();
		inner.pos = inner.len;
		inner.finished = true;
		inner.redraw();
		if terminal_size::terminal_size_of(std::io::stderr()).is_some() {
			let mut stderr = std::io::stderr();
			let _ = stderr.write_all(b"\n");
			let _ = stderr.flush();
		}
	}

	/// Removes the bar line from the terminal without completing it.
	pub fn remove(&self) {
		let mut inner = self.inner.lock();
		inner.finished = true;
		inner.clear_line();
	}

	#[cfg(test)]
	pub(crate) fn position(&self) -> u64 {
		self.inner.lock().pos
	}
}

impl std::fmt::Debug for ProgressBar {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let inner = self.inner.lock();
		f.debug_struct("ProgressBar")
			.field("message", &inner.message)
			.field("pos", &inner.pos)
			.field("len", &inner.len)
			.finish()
	}
}

fn make_bar(pos: u64, len: u64, width: usize) -> String {
	let filled = ((pos as f64 / len.max(1) as f64) * width as f64).floor() as usize;
	let filled = filled.min(width);
	let mut bar = "=".repeat(filled);
	if filled < width {
		bar.push('>');
		bar.push_str(&" ".repeat(width - filled - 1));
	}
	bar
}

fn format_rate(per_sec: f64) -> String {
	if !per_sec.is_finite() {
		return "--/s".to_string();
	}
	if per_sec >= 1_000_000.0 {
		format!("{:.1}M/s", per_sec / 1_000_000.0)
	} else if per_sec >= 1_000.0 {
		format!("{:.1}k/s", per_sec / 1_000.0)
	} else {
		format!("{per_sec:.0}/s")
	}
}

fn format_eta(d: Duration) -> String {
	let total = d.as_secs();
	let hours = total / 3_600;
	let minutes = (total % 3_600) / 60;
	let seconds = total % 60;
	if hours > 0 {
		format!("{hours}:{minutes:02}:{seconds:02}")
	} else if minutes > 0 {
		format!("{minutes:02}:{seconds:02}")
	} else {
		format!("{seconds}s")
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[test]
	fn test_inc_clamps_to_len() {
		let progress = ProgressBar::new("test", 10);
		progress.inc(4);
		progress.inc(100);
		assert_eq!(progress.position(), 10);
	}

	#[test]
	fn test_set_position_clamps_to_len() {
		let progress = ProgressBar::new("test", 5);
		progress.set_position(50);
		assert_eq!(progress.position(), 5);
	}

	#[test]
	fn test_set_len_clamps_position() {
		let progress = ProgressBar::new("test", 100);
		progress.set_position(80);
		progress.set_len(40);
		assert_eq!(progress.position(), 40);
	}

	#[test]
	fn test_finish_moves_to_end() {
		let progress = ProgressBar::new("test", 7);
		progress.finish();
		assert_eq!(progress.position(), 7);
	}

	#[test]
	fn test_bar_shape() {
		assert_eq!(make_bar(0, 10, 5), ">    ");
		assert_eq!(make_bar(5, 10, 4), "==> ");
		assert_eq!(make_bar(10, 10, 4), "====");
	}

	#[rstest]
	#[case(0.0, "0/s")]
	#[case(999.0, "999/s")]
	#[case(1_500.0, "1.5k/s")]
	#[case(2_000_000.0, "2.0M/s")]
	#[case(f64::INFINITY, "--/s")]
	fn test_format_rate(#[case] input: f64, #[case] expected: &str) {
		assert_eq!(format_rate(input), expected);
	}

	#[rstest]
	#[case(45, "45s")]
	#[case(60, "01:00")]
	#[case(3_599, "59:59")]
	#[case(3_661, "1:01:01")]
	fn test_format_eta(#[case] secs: u64, #[case] expected: &str) {
		assert_eq!(format_eta(Duration::from_secs(secs)), expected);
	}
}

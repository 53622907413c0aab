//! Terminal progress reporting for catalog runs.
//!
//! The bar is optional: it is only drawn when stderr is attached to a
//! terminal, so redirected or CI runs stay quiet. Handles are cloneable and
//! thread-safe, which lets the pools bump the same bar from every worker.
//!
//! ```
//! use laspool_core::progress::ProgressBar;
//!
//! let progress = ProgressBar::new("processing tiles", 100);
//! progress.inc(10);
//! progress.set_position(50);
//! progress.finish();
//! ```

mod bar;

pub use bar::ProgressBar;

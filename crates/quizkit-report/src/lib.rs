//! quizkit-report: HTML rendering for the admin dashboard and results.

pub mod html;

pub use html::{write_dashboard_html, write_results_html};

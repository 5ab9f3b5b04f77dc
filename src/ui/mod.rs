//! Terminal UI: a live training dashboard with charts, stats, and the court
//! of the episode in progress, plus the end-of-run reward plot.

pub mod court_widget;
pub mod reward_chart;
pub mod training_dashboard;
pub mod training_view;

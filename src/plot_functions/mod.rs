// src/plot_functions/mod.rs

pub mod plot_growth_curves;

// src/plot_functions/mod.rs

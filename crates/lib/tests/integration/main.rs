mod common;
mod scan_tests;
mod solver_scenarios;

//! Mint lifecycle scenarios run against counting mock collaborators


mod orchestrator_tests;
mod session_tests;

//! Unit tests for the orchestration services.

mod orchestrator_tests;

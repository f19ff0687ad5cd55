//! Unit tests for the capability probe.

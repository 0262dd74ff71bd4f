// Infrastructure layer module
// Contains database adapters and in-memory stand-ins for tests

pub mod repositories;

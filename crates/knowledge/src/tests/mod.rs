//! Cross-module tests for index builds and the chat pipeline.

mod fakes;
mod pipeline;

#[cfg(test)]
mod utils;

mod pipeline;

pub mod command;

#[cfg(test)]
pub(crate) mod testing;

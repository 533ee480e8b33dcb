pub mod gateway;
pub mod image_service;
pub mod poller;
pub mod resolver;

#[cfg(test)]
pub(crate) mod testing;

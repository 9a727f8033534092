pub mod chat;
pub mod doctor;
pub mod history;
pub mod migrate;
pub mod quiz;
pub mod serve;

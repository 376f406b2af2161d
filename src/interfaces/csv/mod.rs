pub mod provision_reader;

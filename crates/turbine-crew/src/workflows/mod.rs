pub mod competency;

pub mod adherence;

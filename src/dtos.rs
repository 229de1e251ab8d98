pub mod messagedtos;

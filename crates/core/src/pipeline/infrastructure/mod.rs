pub mod stabilization_worker;

pub mod air_conditioning;

pub mod country;
pub mod game;
pub mod map;
pub mod pact;
pub mod province;
pub mod submission;
pub mod war;
pub mod world;

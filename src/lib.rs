#![allow(dead_code)]
#![warn(clippy::all)]

pub mod config;
pub mod constants;
pub mod creep;
pub mod findnearest;
pub mod game;
pub mod game_loop;
pub mod jobs;
pub mod logging;
pub mod memorysystem;
pub mod room;
pub mod spawnplanner;
pub mod spawnsystem;
pub mod structures;
pub mod transfer;

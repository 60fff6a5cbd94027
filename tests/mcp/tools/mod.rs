mod config;
mod extraction;

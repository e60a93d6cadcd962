mod coherence;
mod fill_race;
mod properties;
mod snapshot;

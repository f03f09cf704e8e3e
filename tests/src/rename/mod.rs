mod features;
mod properties;
mod scenarios;

mod caching;
mod delegated;
mod outages;
mod strategies;

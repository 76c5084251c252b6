mod enrichment;
mod filters;
mod ordering;
mod recommend;
mod surface;
mod tags;

mod retrace;
mod round_trip;

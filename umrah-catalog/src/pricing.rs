use rust_decimal::Decimal;

/// Fare of the first train in the timetable.
pub const RAIL_BASE_FARE: Decimal = Decimal::from_parts(45, 0, 0, false, 0);

/// Added per position in the timetable.
pub const RAIL_FARE_STEP: Decimal = Decimal::from_parts(5, 0, 0, false, 0);

/// Placeholder rail fare: the dataset carries no tariffs, so trains are
/// priced by their position in the source timetable (45, 50, 55, ... EUR).
pub fn rail_fare(index: usize) -> Decimal {
    RAIL_BASE_FARE + RAIL_FARE_STEP * Decimal::from(index)
}

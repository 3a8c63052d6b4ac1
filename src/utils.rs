use chrono::{DateTime, Datelike, FixedOffset, Local, NaiveDate, TimeZone};

/// Calendar year and 0-based month index of `date`.
pub fn reference_period(date: NaiveDate) -> (i32, usize) {
    (date.year(), date.month0() as usize)
}

/// True when `month` (0-based) of `year` starts after the month containing
/// `today`.
pub fn is_future_month(year: i32, month: usize, today: NaiveDate) -> bool {
    let (current_year, current_month) = reference_period(today);
    year > current_year || (year == current_year && month > current_month)
}

/// Current instant, carrying the local offset so the local calendar date can
/// be recovered. Everything below the service layer takes the reference time
/// as a parameter instead.
pub fn local_now() -> DateTime<FixedOffset> {
    Local::now().fixed_offset()
}

/// Milliseconds since the Unix epoch. Independent of the offset, so wall-clock
/// jumps such as the end of daylight saving time do not move it backwards.
pub fn timestamp_millis<Tz: TimeZone>(at: &DateTime<Tz>) -> i64 {
    at.timestamp_millis()
}

/// Number of pages needed for `len` items, at least 1.
pub fn page_count(len: usize, per_page: usize) -> usize {
    if per_page == 0 {
        return 1;
    }
    len.div_ceil(per_page).max(1)
}

/// The 1-based `page` of `items`. Out-of-range pages are empty.
pub fn paginate<T>(items: &[T], page: usize, per_page: usize) -> &[T] {
    if page == 0 || per_page == 0 {
        return &[];
    }
    let start = (page - 1).saturating_mul(per_page);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(per_page).min(items.len());
    &items[start..end]
}

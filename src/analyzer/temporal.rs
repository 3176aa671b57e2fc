use chrono::{Datelike, NaiveDate, NaiveDateTime};

/// Calendar-month period key, sortable as text: "2024-03".
pub fn month_key(dt: &NaiveDateTime) -> String {
    format!("{:04}-{:02}", dt.year(), dt.month())
}

/// Generates (period_key, period_label) for every calendar month touched by
/// [date_from, date_to], in chronological order.
pub fn generate_month_keys(date_from: NaiveDate, date_to: NaiveDate) -> Vec<(String, String)> {
    let mut result = Vec::new();
    let mut year = date_from.year();
    let mut month = date_from.month();
    let end_year = date_to.year();
    let end_month = date_to.month();

    loop {
        if year > end_year || (year == end_year && month > end_month) {
            break;
        }

        let period_key = format!("{:04}-{:02}", year, month);
        let period_label = format!("{} {}", month_name(month), year);
        result.push((period_key, period_label));

        if month == 12 {
            year += 1;
            month = 1;
        } else {
            month += 1;
        }
    }

    result
}

fn month_name(month: u32) -> &'static str {
    match month {
        1 => "Janeiro",
        2 => "Fevereiro",
        3 => "Março",
        4 => "Abril",
        5 => "Maio",
        6 => "Junho",
        7 => "Julho",
        8 => "Agosto",
        9 => "Setembro",
        10 => "Outubro",
        11 => "Novembro",
        12 => "Dezembro",
        _ => "Desconhecido",
    }
}

// botwizard-core/src/sheets/schema.rs
//
// Canonical multi-sheet layout provisioned for every new project
// spreadsheet. Header order is part of the contract with the bot runtime;
// do not reorder.

/// The six sheets of a provisioned document, in creation order.
pub const SHEET_NAMES: [&str; 6] = ["Payments", "Attendance", "Leave", "Absence", "KB", "Triage"];

pub fn headers_for(sheet_name: &str) -> Option<&'static [&'static str]> {
    match sheet_name {
        "Payments" => Some(&[
            "Date", "Student", "Amount", "Period", "Class", "PaymentMethod", "Notes",
        ]),
        "Attendance" => Some(&["Date", "Class", "Present", "Absent", "Total", "Comment"]),
        "Leave" => Some(&[
            "Staff", "Type", "Start", "End", "Reason", "Status", "ApprovedBy",
        ]),
        "Absence" => Some(&["Date", "Student", "Class", "Reason", "Excused"]),
        "KB" => Some(&["Question", "Answer", "Keywords", "Priority"]),
        "Triage" => Some(&["Id", "Chat", "User", "Question", "Answer", "Status", "Date"]),
        _ => None,
    }
}

pub fn is_known_sheet(sheet_name: &str) -> bool {
    SHEET_NAMES.contains(&sheet_name)
}

/// A1-notation range covering exactly the header row of a sheet, e.g.
/// `Payments!A1:G1`.
pub fn header_range(sheet_name: &str) -> Option<String> {
    let headers = headers_for(sheet_name)?;
    let last_col = (b'A' + headers.len() as u8 - 1) as char;
    Some(format!("{}!A1:{}1", sheet_name, last_col))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_sheet_has_headers() {
        for name in SHEET_NAMES {
            assert!(headers_for(name).is_some(), "missing headers for {name}");
        }
    }

    #[test]
    fn header_order_is_the_documented_contract() {
        assert_eq!(
            headers_for("Payments").unwrap(),
            &["Date", "Student", "Amount", "Period", "Class", "PaymentMethod", "Notes"]
        );
        assert_eq!(
            headers_for("Triage").unwrap(),
            &["Id", "Chat", "User", "Question", "Answer", "Status", "Date"]
        );
    }

    #[test]
    fn header_range_covers_the_header_row() {
        assert_eq!(header_range("Payments").as_deref(), Some("Payments!A1:G1"));
        assert_eq!(header_range("Absence").as_deref(), Some("Absence!A1:E1"));
        assert_eq!(header_range("KB").as_deref(), Some("KB!A1:D1"));
        assert!(header_range("Nonexistent").is_none());
    }
}

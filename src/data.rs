use super::*;

pub struct Headers(Vec<String>);

/// An all-numeric table: a header row plus observation rows of equal length.
pub struct Data {
    cols: Headers,
    rows: Vec<Vec<f64>>,
}

impl Headers {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn find_ignore_case(&self, s: &str) -> Option<usize> {
        self.0
            .iter()
            .enumerate()
            .find_map(|(i, x)| x.eq_ignore_ascii_case(s).then_some(i))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<T: AsRef<str>> FromIterator<T> for Headers {
    fn from_iter<I: IntoIterator<Item = T>>(i: I) -> Self {
        Headers(
            i.into_iter()
                .map(|t| t.as_ref().trim().to_string())
                .collect(),
        )
    }
}

/// Help text for a failed column lookup: a fuzzy-matched suggestion if one
/// is close enough, otherwise the list of available columns.
pub fn match_hdr_help(hdrs: &Headers, target: &str) -> String {
    let mut search = simsearch::SimSearch::new();
    for (i, h) in hdrs.names().enumerate() {
        search.insert(i, h);
    }

    match search.search(target).first().and_then(|&i| hdrs.0.get(i)) {
        Some(suggestion) => format!("a column named '{suggestion}' is a close match"),
        None => format!(
            "available columns are: {}",
            hdrs.names().collect::<Vec<_>>().join(", ")
        ),
    }
}

impl Data {
    pub fn new(headers: Headers, data: Vec<Vec<f64>>) -> Result<Self> {
        let headers_len = headers.len();

        for (i, row) in data.iter().enumerate() {
            ensure!(
                headers_len == row.len(),
                "row index {} does not have the same length as the headers",
                i
            );
        }

        Ok(Self {
            cols: headers,
            rows: data,
        })
    }

    /// Returns the number of observation rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn headers(&self) -> &Headers {
        &self.cols
    }

    /// Extract one column as an owned sequence, in row order.
    ///
    /// `colidx` must come from a headers lookup; every row is as wide as the
    /// headers by construction.
    pub fn column(&self, colidx: usize) -> Vec<f64> {
        self.rows.iter().map(|row| row[colidx]).collect()
    }
}

pub struct CsvReader {
    rdr: csv::Reader<Box<dyn std::io::Read>>,
}

impl CsvReader {
    pub fn new<R: std::io::Read + 'static>(rdr: R) -> Self {
        Self {
            rdr: csv::Reader::from_reader(Box::new(rdr)),
        }
    }

    /// Read the whole table, parsing every cell as a float.
    pub fn into_data(mut self) -> Result<Data> {
        let hdrs = self
            .rdr
            .headers()
            .into_diagnostic()
            .wrap_err("failed to read CSV header row")?;

        ensure!(!hdrs.is_empty(), "headers row is empty");

        let headers: Headers = hdrs.iter().collect();

        let mut data = Vec::new();
        for (i, row) in self.rdr.records().enumerate() {
            let row = row
                .into_diagnostic()
                .wrap_err_with(|| format!("failed to read row {} in CSV", i + 1))?;

            let row: Vec<f64> = row
                .iter()
                .enumerate()
                .map(|(j, cell)| {
                    cell.trim()
                        .parse::<f64>()
                        .into_diagnostic()
                        .wrap_err_with(|| format!("in column index {j}"))
                        .wrap_err_with(|| format!("in row index {}", i + 1))
                })
                .collect::<Result<_>>()?;

            data.push(row);
        }

        Data::new(headers, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(csv: &str) -> Result<Data> {
        CsvReader::new(std::io::Cursor::new(csv.to_string())).into_data()
    }

    #[test]
    fn columns_extract_in_row_order() {
        let data = read("t,V\n1,10\n2,20\n3,30\n").unwrap();
        assert_eq!(data.len(), 3);
        assert_eq!(data.column(0), vec![1.0, 2.0, 3.0]);
        assert_eq!(data.column(1), vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn header_lookup_ignores_case_and_whitespace() {
        let data = read(" t , V \n1,2\n").unwrap();
        assert_eq!(data.headers().find_ignore_case("T"), Some(0));
        assert_eq!(data.headers().find_ignore_case("v"), Some(1));
        assert_eq!(data.headers().find_ignore_case("w"), None);
    }

    #[test]
    fn non_numeric_cells_are_rejected() {
        assert!(read("t,V\n1,abc\n").is_err());
    }

    #[test]
    fn suggestion_for_a_near_miss() {
        let data = read("time,Volts\n1,2\n").unwrap();
        let help = match_hdr_help(data.headers(), "times");
        assert!(help.contains("time"), "{help}");
    }

    #[test]
    fn listing_when_nothing_is_close() {
        let data = read("t,V\n1,2\n").unwrap();
        let help = match_hdr_help(data.headers(), "zzzzzz");
        assert!(help.contains("t, V") || help.contains("close match"), "{help}");
    }
}

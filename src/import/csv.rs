//! Streaming CSV decoding.

use futures::TryStreamExt;
use tokio::io::AsyncRead;

use super::ImportRecord;

/// Decode a header row plus comma-separated records from a stream.
///
/// Rows may be wider or narrower than the header. Any read error, invalid
/// UTF-8, or broken quoting fails the whole stream.
pub async fn parse_records<R>(reader: R) -> csv_async::Result<Vec<ImportRecord>>
where
    R: AsyncRead + Unpin + Send,
{
    let mut csv = csv_async::AsyncReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .create_reader(reader);

    let headers = csv.headers().await?.clone();

    csv.records()
        .map_ok(|row| ImportRecord::from_row(headers.iter(), row.iter()))
        .try_collect()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn parse(input: &str) -> csv_async::Result<Vec<ImportRecord>> {
        parse_records(input.as_bytes()).await
    }

    #[tokio::test]
    async fn test_parses_rows_against_header() {
        let records = parse("name,price,count\nLamp,12.5,3\nDesk,99,1\n")
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("name"), Some("Lamp"));
        assert_eq!(records[1].get("count"), Some("1"));
    }

    #[tokio::test]
    async fn test_quoted_fields() {
        let records = parse("name,description\n\"Lamp, tall\",\"says \"\"hi\"\"\"\n")
            .await
            .unwrap();

        assert_eq!(records[0].get("name"), Some("Lamp, tall"));
        assert_eq!(records[0].get("description"), Some("says \"hi\""));
    }

    #[tokio::test]
    async fn test_header_only_and_empty_inputs() {
        assert!(parse("name,price,count\n").await.unwrap().is_empty());
        assert!(parse("").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ragged_rows() {
        let records = parse("name,price\nLamp\nDesk,5,extra\n").await.unwrap();

        assert_eq!(records[0].len(), 1);
        assert_eq!(records[1].get("_2"), Some("extra"));
    }

    #[tokio::test]
    async fn test_invalid_utf8_fails() {
        let bytes: &[u8] = b"name,price\n\xff\xfe,1\n";
        assert!(parse_records(bytes).await.is_err());
    }

    #[tokio::test]
    async fn test_read_error_fails() {
        let reader = tokio_test::io::Builder::new()
            .read(b"name,price\nLamp,")
            .read_error(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset"))
            .build();

        assert!(parse_records(reader).await.is_err());
    }
}

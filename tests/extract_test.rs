use mbox_sort::*;
use std::path::Path;

const PLAIN: &[u8] = b"From: \"Jane Doe\" <jane@x.com>\r\n\
                       Subject: Hello World!!!\r\n\
                       Date: Thu, 01 Jan 2025 12:00:00 +0000\r\n\
                       \r\n\
                       Hello from Jane";

const WITH_ATTACHMENT: &[u8] = b"From: \"Jane Doe\" <jane@x.com>\r\n\
                                 Subject: Your invoice\r\n\
                                 Date: Fri, 02 Jan 2025 09:30:00 +0000\r\n\
                                 MIME-Version: 1.0\r\n\
                                 Content-Type: multipart/mixed; boundary=\"XYZ\"\r\n\
                                 \r\n\
                                 --XYZ\r\n\
                                 Content-Type: text/plain\r\n\
                                 \r\n\
                                 Thanks\r\n\
                                 --XYZ\r\n\
                                 Content-Type: application/octet-stream\r\n\
                                 Content-Disposition: attachment; filename=\"invoice#1.pdf\"\r\n\
                                 Content-Transfer-Encoding: base64\r\n\
                                 \r\n\
                                 SGVsbG8=\r\n\
                                 --XYZ--\r\n";

fn message(from: &str, subject: &str) -> Vec<u8> {
    format!("From: {from}\r\nSubject: {subject}\r\n\r\nbody of {subject}").into_bytes()
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

#[test]
fn test_non_multipart_message() {
    let dir = tempfile::tempdir().unwrap();
    let options = ExtractOptions::new(dir.path());

    let summary = extract_messages([PLAIN], &options).unwrap();
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.extracted, 1);

    let text = read(&dir.path().join("Jane Doe").join("0001_Hello World.txt"));
    let expected = format!(
        "Subject: Hello World!!!\n\
         From: \"Jane Doe\" <jane@x.com>\n\
         Date: Thu, 01 Jan 2025 12:00:00 +0000\n\
         {}\n\n\
         Hello from Jane",
        "-".repeat(40)
    );
    assert_eq!(text, expected);
}

#[test]
fn test_attachment_saved_and_referenced() {
    let dir = tempfile::tempdir().unwrap();
    let options = ExtractOptions::new(dir.path());

    extract_messages([WITH_ATTACHMENT], &options).unwrap();

    let sender_dir = dir.path().join("Jane Doe");
    let attachment = sender_dir.join("attachments").join("0001").join("invoice1.pdf");
    assert_eq!(std::fs::read(&attachment).unwrap(), b"Hello");

    let text = read(&sender_dir.join("0001_Your invoice.txt"));
    assert!(text.contains("Attachments:\n- attachments/0001/invoice1.pdf\n"));
    assert_eq!(
        TextRecord::parse_attachment_refs(&text),
        vec!["attachments/0001/invoice1.pdf".to_string()]
    );
    assert!(text.trim_end().ends_with("Thanks"));
}

#[test]
fn test_sequence_index_counts_every_message() {
    let dir = tempfile::tempdir().unwrap();
    let messages = [
        message("a@x.com", "Weekly report"),
        message("b@x.com", "URGENT: server down"),
        message("c@x.com", "Lunch"),
        message("Urgent Team <team@x.com>", "Standup"),
    ];
    let options = ExtractOptions::new(dir.path()).with_keyword("urgent");

    let summary = extract_messages(messages.iter().map(Vec::as_slice), &options).unwrap();

    assert_eq!(summary.processed, 4);
    assert_eq!(summary.extracted, 2);
    assert!(dir.path().join("bx.com").join("0002_URGENT server down.txt").is_file());
    assert!(dir.path().join("Urgent Team").join("0004_Standup.txt").is_file());
    assert!(!dir.path().join("ax.com").exists());
    assert!(!dir.path().join("cx.com").exists());
}

#[test]
fn test_limit_counts_extracted_records() {
    let dir = tempfile::tempdir().unwrap();
    let messages = [
        message("a@x.com", "match one"),
        message("a@x.com", "other"),
        message("a@x.com", "match two"),
        message("a@x.com", "match three"),
    ];
    let options = ExtractOptions::new(dir.path())
        .with_keyword("MATCH")
        .with_limit(2);

    let summary = extract_messages(messages.iter().map(Vec::as_slice), &options).unwrap();

    assert_eq!(
        summary,
        ExtractSummary {
            processed: 3,
            extracted: 2,
            failed: 0,
            limit_reached: true,
        }
    );
    let sender_dir = dir.path().join("ax.com");
    assert!(sender_dir.join("0001_match one.txt").is_file());
    assert!(sender_dir.join("0003_match two.txt").is_file());
    assert!(!sender_dir.join("0004_match three.txt").exists());
}

#[test]
fn test_zero_limit_means_unlimited() {
    let dir = tempfile::tempdir().unwrap();
    let messages = [message("a@x.com", "one"), message("a@x.com", "two")];
    let options = ExtractOptions::new(dir.path()).with_limit(0);

    let summary = extract_messages(messages.iter().map(Vec::as_slice), &options).unwrap();
    assert_eq!(summary.extracted, 2);
    assert!(!summary.limit_reached);
}

#[test]
fn test_missing_headers_use_placeholders() {
    let dir = tempfile::tempdir().unwrap();
    let raw: &[u8] = b"X-Mailer: test\r\n\r\n";

    extract_messages([raw], &ExtractOptions::new(dir.path())).unwrap();

    let text = read(&dir.path().join(UNKNOWN_SENDER).join("0001_No Subject.txt"));
    assert!(text.starts_with("Subject: No Subject\nFrom: Unknown Sender\nDate: \n"));
    assert!(text.ends_with(&format!("\n\n{NO_BODY_PLACEHOLDER}\n")));
}

#[test]
fn test_encoded_headers_decoded() {
    let dir = tempfile::tempdir().unwrap();
    let raw: &[u8] = b"From: =?UTF-8?Q?Ren=C3=A9e?= <renee@x.com>\r\n\
                       Subject: =?UTF-8?B?T3JkZXIgY29uZmlybWVk?=\r\n\
                       \r\n\
                       ok";

    extract_messages([raw], &ExtractOptions::new(dir.path())).unwrap();

    let text = read(&dir.path().join("Renée").join("0001_Order confirmed.txt"));
    assert!(text.starts_with("Subject: Order confirmed\nFrom: Renée <renee@x.com>\n"));
}

#[test]
fn test_undecodable_attachment_does_not_stop_extraction() {
    let dir = tempfile::tempdir().unwrap();
    let broken: &[u8] = b"From: shop@x.com\r\n\
                          Subject: Statement\r\n\
                          Content-Type: multipart/mixed; boundary=\"B\"\r\n\
                          \r\n\
                          --B\r\n\
                          Content-Type: text/plain\r\n\
                          \r\n\
                          See PDF\r\n\
                          --B\r\n\
                          Content-Type: application/pdf; name=\"statement.pdf\"\r\n\
                          Content-Transfer-Encoding: base64\r\n\
                          \r\n\
                          @@@@####\r\n\
                          --B--\r\n";

    let summary = extract_messages([broken, PLAIN], &ExtractOptions::new(dir.path())).unwrap();
    assert_eq!(summary.extracted, 2);

    let sender_dir = dir.path().join("shopx.com");
    let text = read(&sender_dir.join("0001_Statement.txt"));
    assert!(!text.contains("Attachments:"));
    assert!(!sender_dir.join("attachments").exists());
    assert!(dir.path().join("Jane Doe").join("0002_Hello World.txt").is_file());
}

#[test]
fn test_failed_message_does_not_stop_extraction() {
    let dir = tempfile::tempdir().unwrap();
    // A plain file where the sender folder should go
    std::fs::write(dir.path().join("blocked"), b"").unwrap();
    let messages = [message("blocked", "first"), message("a@x.com", "second")];

    let summary =
        extract_messages(messages.iter().map(Vec::as_slice), &ExtractOptions::new(dir.path()))
            .unwrap();

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.extracted, 1);
    assert_eq!(summary.failed, 1);
    assert!(dir.path().join("ax.com").join("0002_second.txt").is_file());
}

#[test]
fn test_extract_mailbox_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let mbox_path = dir.path().join("archive.mbox");
    let mut mbox = b"From jane@x.com Thu Jan  1 12:00:00 2025\n".to_vec();
    mbox.extend_from_slice(PLAIN);
    mbox.extend_from_slice(b"\nFrom jane@x.com Fri Jan  2 09:30:00 2025\n");
    mbox.extend_from_slice(WITH_ATTACHMENT);
    std::fs::write(&mbox_path, mbox).unwrap();

    let out = dir.path().join("out");
    let summary = extract_mailbox(&mbox_path, &ExtractOptions::new(&out)).unwrap();

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.extracted, 2);
    assert!(out.join("Jane Doe").join("0001_Hello World.txt").is_file());
    assert!(out.join("Jane Doe").join("attachments/0002/invoice1.pdf").is_file());
}

#[test]
fn test_extract_mailbox_missing_store() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");

    let err = extract_mailbox(dir.path().join("nope.mbox"), &ExtractOptions::new(&out)).unwrap_err();

    assert!(matches!(err, Error::MailStoreNotFound(_)));
    assert!(!out.exists());
}

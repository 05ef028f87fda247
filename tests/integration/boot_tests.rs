//! Boot-time image validation against the mock mark store.

use ota_lifecycle::app::events::AppEvent;
use ota_lifecycle::app::ports::ImageMark;
use ota_lifecycle::boot::validate_running_image;
use ota_lifecycle::error::MarkError;

use crate::mock_hw::{MockMark, RecordingSink};

#[test]
fn pending_image_is_confirmed_once() {
    let mut mark = MockMark::new(ImageMark::PendingVerify);
    mark.digest = Some([0xAB; 32]);
    let mut sink = RecordingSink::new();

    assert_eq!(
        validate_running_image(&mut mark, &mut sink),
        Ok(ImageMark::PendingVerify)
    );
    assert_eq!(mark.confirms, 1);
    assert_eq!(
        sink.events,
        vec![AppEvent::BootValidated {
            mark: ImageMark::PendingVerify,
            confirmed: true
        }]
    );

    // Second boot of the same image: nothing to do.
    assert_eq!(
        validate_running_image(&mut mark, &mut sink),
        Ok(ImageMark::Confirmed)
    );
    assert_eq!(mark.confirms, 1);
}

#[test]
fn confirmed_and_undefined_are_left_alone() {
    for initial in [ImageMark::Confirmed, ImageMark::Undefined] {
        let mut mark = MockMark::new(initial);
        let mut sink = RecordingSink::new();
        assert_eq!(validate_running_image(&mut mark, &mut sink), Ok(initial));
        assert_eq!(mark.confirms, 0);
        assert_eq!(mark.mark, initial);
    }
}

#[test]
fn mark_errors_propagate() {
    let mut mark = MockMark::new(ImageMark::PendingVerify);
    mark.confirm_error = Some(MarkError::ConfirmFailed(-1));
    let mut sink = RecordingSink::new();
    assert_eq!(
        validate_running_image(&mut mark, &mut sink),
        Err(MarkError::ConfirmFailed(-1))
    );
    assert!(sink.events.is_empty());

    let mut mark = MockMark::new(ImageMark::Confirmed);
    mark.read_error = Some(MarkError::NoRunningPartition);
    assert_eq!(
        validate_running_image(&mut mark, &mut sink),
        Err(MarkError::NoRunningPartition)
    );
}

#[test]
fn both_digests_are_reported_before_the_mark_is_touched() {
    let mut mark = MockMark::new(ImageMark::PendingVerify);
    mark.bootloader_digest = Some([0x11; 32]);
    mark.digest = Some([0x22; 32]);
    mark.read_error = Some(MarkError::ReadFailed(-1));
    let mut sink = RecordingSink::new();

    assert_eq!(
        validate_running_image(&mut mark, &mut sink),
        Err(MarkError::ReadFailed(-1))
    );
    assert_eq!(mark.digest_reads, 2);
    assert_eq!(mark.confirms, 0);
}

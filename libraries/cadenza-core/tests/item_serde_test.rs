//! Serialization shape of catalog items

use cadenza_core::{ContentLocator, ItemId, PlayableItem};
use serde_json::json;

#[test]
fn item_serializes_with_transparent_newtypes() {
    let item = PlayableItem::new(
        ItemId::new(42),
        "Title",
        "Artist",
        "Album",
        125_000,
        ContentLocator::new("content://media/42"),
    )
    .with_artwork(ContentLocator::new("content://art/7"));

    let value = serde_json::to_value(&item).unwrap();

    assert_eq!(value["id"], json!(42));
    assert_eq!(value["locator"], json!("content://media/42"));
    assert_eq!(value["artwork"], json!("content://art/7"));
    assert_eq!(value["duration_ms"], json!(125_000));
}

#[test]
fn item_without_artwork_deserializes() {
    let item: PlayableItem = serde_json::from_value(json!({
        "id": 1,
        "title": "Untitled",
        "artist": "<unknown>",
        "album": "",
        "duration_ms": 0,
        "locator": "file:///music/untitled.mp3",
        "artwork": null
    }))
    .unwrap();

    assert_eq!(item.id, ItemId::new(1));
    assert_eq!(item.known_duration_ms(), None);
    assert_eq!(item.formatted_duration(), "0:00");
    assert!(item.artwork.is_none());
}

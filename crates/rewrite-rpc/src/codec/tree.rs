//! Codecs for the formatting primitives shared by every language

use async_trait::async_trait;

use rewrite_core::{Comment, Container, LeftPadded, Marker, Markers, RightPadded, Space, Tree};

use super::{RpcCodec, RpcRef};
use crate::error::{Result, RpcError};
use crate::receive::ReceiveQueue;
use crate::send::SendQueue;

fn expect_type(value_type: &str, expected: &str) -> Result<()> {
    if value_type == expected {
        Ok(())
    } else {
        Err(RpcError::unknown_value_type(value_type))
    }
}

impl RpcRef for Marker {
    fn value_type(&self) -> &'static str {
        self.type_name()
    }
}

#[async_trait]
impl RpcCodec for Space {
    fn value_type(&self) -> &'static str {
        "Space"
    }

    fn rpc_send(&self, before: Option<&Self>, q: &mut SendQueue<'_>) -> Result<()> {
        q.get_and_send_value(self, before, |s| &s.whitespace)?;
        q.send_list(
            Some(self.comments.as_slice()),
            before.map(|b| b.comments.as_slice()),
            |c| (c.multiline, c.text.clone()),
        )
    }

    async fn rpc_receive(
        before: Option<&Self>,
        value_type: &str,
        q: &mut ReceiveQueue<'_>,
    ) -> Result<Self> {
        expect_type(value_type, "Space")?;
        let whitespace = q
            .receive_value_required(before.map(|b| &b.whitespace), "whitespace")
            .await?;
        let comments = q
            .receive_list(before.map(|b| b.comments.as_slice()))
            .await?
            .unwrap_or_default();
        Ok(Space::build(whitespace, comments))
    }
}

#[async_trait]
impl RpcCodec for Comment {
    fn value_type(&self) -> &'static str {
        "Comment"
    }

    fn rpc_send(&self, before: Option<&Self>, q: &mut SendQueue<'_>) -> Result<()> {
        q.get_and_send_value(self, before, |c| &c.multiline)?;
        q.get_and_send_value(self, before, |c| &c.text)?;
        q.get_and_send_value(self, before, |c| &c.suffix)?;
        q.get_and_send(self, before, |c| &c.markers)
    }

    async fn rpc_receive(
        before: Option<&Self>,
        value_type: &str,
        q: &mut ReceiveQueue<'_>,
    ) -> Result<Self> {
        expect_type(value_type, "Comment")?;
        Ok(Comment {
            multiline: q
                .receive_value_required(before.map(|b| &b.multiline), "multiline")
                .await?,
            text: q
                .receive_value_required(before.map(|b| &b.text), "text")
                .await?,
            suffix: q
                .receive_value_required(before.map(|b| &b.suffix), "suffix")
                .await?,
            markers: q
                .receive_required(before.map(|b| &b.markers), "markers")
                .await?,
        })
    }
}

#[async_trait]
impl RpcCodec for Markers {
    fn value_type(&self) -> &'static str {
        "Markers"
    }

    fn rpc_send(&self, before: Option<&Self>, q: &mut SendQueue<'_>) -> Result<()> {
        q.get_and_send_value(self, before, |m| &m.id)?;
        q.send_ref_list(Some(self.markers.as_slice()), before.map(|b| b.markers.as_slice()))
    }

    async fn rpc_receive(
        before: Option<&Self>,
        value_type: &str,
        q: &mut ReceiveQueue<'_>,
    ) -> Result<Self> {
        expect_type(value_type, "Markers")?;
        let id = q
            .receive_value_required(before.map(|b| &b.id), "id")
            .await?;
        let markers = q
            .receive_ref_list(before.map(|b| b.markers.as_slice()))
            .await?
            .unwrap_or_default();
        Ok(Markers { id, markers })
    }
}

#[async_trait]
impl<T: RpcCodec> RpcCodec for RightPadded<T> {
    fn value_type(&self) -> &'static str {
        "RightPadded"
    }

    fn rpc_send(&self, before: Option<&Self>, q: &mut SendQueue<'_>) -> Result<()> {
        q.get_and_send(self, before, |p| &p.element)?;
        q.get_and_send(self, before, |p| &p.after)?;
        q.get_and_send(self, before, |p| &p.markers)
    }

    async fn rpc_receive(
        before: Option<&Self>,
        value_type: &str,
        q: &mut ReceiveQueue<'_>,
    ) -> Result<Self> {
        expect_type(value_type, "RightPadded")?;
        Ok(RightPadded {
            element: q
                .receive_required(before.map(|b| &b.element), "element")
                .await?,
            after: q.receive_required(before.map(|b| &b.after), "after").await?,
            markers: q
                .receive_required(before.map(|b| &b.markers), "markers")
                .await?,
        })
    }
}

#[async_trait]
impl<T: RpcCodec> RpcCodec for LeftPadded<T> {
    fn value_type(&self) -> &'static str {
        "LeftPadded"
    }

    fn rpc_send(&self, before: Option<&Self>, q: &mut SendQueue<'_>) -> Result<()> {
        q.get_and_send(self, before, |p| &p.before)?;
        q.get_and_send(self, before, |p| &p.element)?;
        q.get_and_send(self, before, |p| &p.markers)
    }

    async fn rpc_receive(
        before: Option<&Self>,
        value_type: &str,
        q: &mut ReceiveQueue<'_>,
    ) -> Result<Self> {
        expect_type(value_type, "LeftPadded")?;
        Ok(LeftPadded {
            before: q
                .receive_required(before.map(|b| &b.before), "before")
                .await?,
            element: q
                .receive_required(before.map(|b| &b.element), "element")
                .await?,
            markers: q
                .receive_required(before.map(|b| &b.markers), "markers")
                .await?,
        })
    }
}

/// Elements are matched by the id of the node they wrap
#[async_trait]
impl<T: RpcCodec + Tree> RpcCodec for Container<T> {
    fn value_type(&self) -> &'static str {
        "Container"
    }

    fn rpc_send(&self, before: Option<&Self>, q: &mut SendQueue<'_>) -> Result<()> {
        q.get_and_send(self, before, |c| &c.before)?;
        q.send_list(
            Some(self.elements.as_slice()),
            before.map(|b| b.elements.as_slice()),
            |p| p.element.id(),
        )?;
        q.get_and_send(self, before, |c| &c.markers)
    }

    async fn rpc_receive(
        before: Option<&Self>,
        value_type: &str,
        q: &mut ReceiveQueue<'_>,
    ) -> Result<Self> {
        expect_type(value_type, "Container")?;
        let space = q
            .receive_required(before.map(|b| &b.before), "before")
            .await?;
        let elements = q
            .receive_list(before.map(|b| b.elements.as_slice()))
            .await?
            .unwrap_or_default();
        let markers = q
            .receive_required(before.map(|b| &b.markers), "markers")
            .await?;
        Ok(Container {
            before: space,
            elements,
            markers,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::codec::testing;
    use crate::data::State;
    use crate::refs::RpcSession;

    #[tokio::test]
    async fn test_space_comment_change() {
        let before = Space::format(" // a\n  /* b */ ");
        let mut after = before.clone();
        after.comments[1].text = " c ".to_string();

        let mut sender = RpcSession::new();
        let mut receiver = RpcSession::new();
        let records = testing::send(&mut sender, Some(&after), Some(&before));
        let received = testing::receive(&mut receiver, records, Some(&before))
            .await
            .unwrap();
        assert_eq!(received, after);
    }

    #[tokio::test]
    async fn test_markers_send_shared_marker_once() {
        let hit = Arc::new(Marker::search_result(None));
        let first = Markers::new().add(hit.clone());
        let second = Markers::new().add(hit.clone());

        let mut sender = RpcSession::new();
        let mut receiver = RpcSession::new();

        let records = testing::send(&mut sender, Some(&first), None);
        let got_first: Markers = testing::receive(&mut receiver, records, None).await.unwrap();

        let records = testing::send(&mut sender, Some(&second), None);
        let payloads = records
            .iter()
            .filter(|r| r.state == State::Add && r.value.is_some() && r.reference.is_some())
            .count();
        assert_eq!(payloads, 0);
        let got_second: Markers = testing::receive(&mut receiver, records, None).await.unwrap();

        assert!(Arc::ptr_eq(&got_first.markers[0], &got_second.markers[0]));
        assert_eq!(*got_first.markers[0], *hit);
        assert_eq!(got_second.id, second.id);
    }

    #[tokio::test]
    async fn test_wrong_value_type_is_rejected() {
        let space = Space::whitespace(" ");
        let mut sender = RpcSession::new();
        let mut records = testing::send(&mut sender, Some(&space), None);
        records[0].value_type = Some("Spaces".to_string());

        let mut receiver = RpcSession::new();
        let mut batches = std::collections::VecDeque::from([records]);
        let mut q = ReceiveQueue::new(&mut batches, &mut receiver.received);
        let err = q.receive_object::<Space>(None).await.unwrap_err();
        assert!(matches!(
            err,
            RpcError::UnknownValueType { value_type } if value_type == "Spaces"
        ));
    }
}

//! WebSocket Chat Relay
//!
//! Real-time chat over WebSocket: sessions join rooms, send messages and
//! typing indicators, and receive everything that happens in their room.
//!
//! ## Architecture
//!
//! - **ChatHub**: Tracks sessions and room membership, fans events out
//! - **Session**: Handles the authenticated upgrade and runs the two
//!   per-connection pump tasks
//! - **Events**: The tagged JSON envelope spoken on the wire
//!
//! ## Example
//!
//! ```javascript
//! // Browser
//! const ws = new WebSocket('ws://localhost:8080/ws?token=' + token);
//!
//! ws.onopen = () => {
//!   ws.send(JSON.stringify({type: 'join_room', payload: {room_id: roomId}}));
//!   ws.send(JSON.stringify({type: 'send_message', payload: {room_id: roomId, content: 'hi'}}));
//! };
//!
//! ws.onmessage = (event) => {
//!   const msg = JSON.parse(event.data);
//!   console.log('Received:', msg.type, msg.payload);
//! };
//! ```

mod events;
mod hub;
mod session;

pub use events::{ClientEvent, ServerEvent};
pub use hub::{ChatHub, HubConfig, SessionId};
pub use session::websocket_handler;

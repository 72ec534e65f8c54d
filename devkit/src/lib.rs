/*!
# Powerdeck DevKit - stubs et utilitaires de test

Tout le nécessaire pour piloter le kernel sans Slack, sans vCenter ni réseau :
- `MockChatApi` : enregistre les posts éphémères et les mises à jour response_url
- `MockInventory` : inventaire vCenter en mémoire, trace les arrêts demandés
- `RecordingTransport` : capture les datagrammes Wake-on-LAN au lieu de les diffuser
- `payloads` : enveloppes Events API et callbacks block_actions
- `TestHarness` : vrai routeur + requêtes signées
*/

pub mod chat_stub;
pub mod inventory_stub;
pub mod payloads;
pub mod test_utils;
pub mod wake_stub;

pub use chat_stub::MockChatApi;
pub use inventory_stub::MockInventory;
pub use test_utils::TestHarness;
pub use wake_stub::RecordingTransport;

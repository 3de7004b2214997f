//! Host simulator page: embeds the webview in an iframe and plays the mobile
//! app's side of the bridge over `postMessage`.

use axum::response::Html;

const HOST_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Webview Map Host</title>
<style>
  body { margin: 0; font-family: sans-serif; display: flex; height: 100vh; }
  #device { width: 390px; height: 760px; margin: 16px; border: 8px solid #222; border-radius: 24px; overflow: hidden; flex: none; }
  #device iframe { width: 100%; height: 100%; border: 0; }
  #controls { flex: 1; padding: 16px; display: flex; flex-direction: column; gap: 8px; min-width: 0; }
  #controls fieldset { display: flex; gap: 8px; align-items: center; flex-wrap: wrap; }
  #log { flex: 1; overflow: auto; background: #111; color: #ddd; padding: 8px; font-size: 12px; }
  #log pre { margin: 0 0 4px 0; white-space: pre-wrap; word-break: break-all; }
  .in { color: #8f8; }
  .out { color: #8cf; }
</style>
</head>
<body>
<div id="device"><iframe id="webview" src="/?debug=true"></iframe></div>
<div id="controls">
  <fieldset>
    <legend>Markers</legend>
    <label>count <input id="count" type="number" value="7" min="0" max="200"></label>
    <button id="send-markers">Send demo markers</button>
    <button id="send-broken">Send batch with a broken marker</button>
    <button id="clear-markers">Clear markers</button>
  </fieldset>
  <fieldset>
    <legend>Center</legend>
    <label>lat <input id="lat" type="number" step="0.01" value="51.5"></label>
    <label>lng <input id="lng" type="number" step="0.01" value="-0.09"></label>
    <button id="send-center">Fly to</button>
  </fieldset>
  <fieldset>
    <legend>Debug</legend>
    <button id="toggle-debug">Toggle debug console</button>
  </fieldset>
  <div id="log"></div>
</div>
<script>
  const frame = document.getElementById('webview');
  const log = document.getElementById('log');
  let debugOn = true;

  function show(cls, prefix, text) {
    const el = document.createElement('pre');
    el.className = cls;
    el.textContent = prefix + ' ' + text;
    log.prepend(el);
  }

  function send(type, payload) {
    const text = JSON.stringify({ type, payload });
    frame.contentWindow.postMessage(text, '*');
    show('out', '->', text);
  }

  async function demoMarkers() {
    const count = document.getElementById('count').value || '7';
    const lat = document.getElementById('lat').value;
    const lng = document.getElementById('lng').value;
    const resp = await fetch(`/api/demo-markers?count=${count}&lat=${lat}&lng=${lng}`);
    if (!resp.ok) {
      show('in', '!!', await resp.text());
      return null;
    }
    return resp.json();
  }

  window.addEventListener('message', (e) => {
    if (e.source !== frame.contentWindow) return;
    show('in', '<-', typeof e.data === 'string' ? e.data : JSON.stringify(e.data));
  });

  document.getElementById('send-markers').onclick = async () => {
    const body = await demoMarkers();
    if (body) send('UPDATE_MARKERS', body);
  };
  document.getElementById('send-broken').onclick = async () => {
    const body = await demoMarkers();
    if (!body) return;
    body.markers.splice(1, 0, { id: 'broken', icon: '⛔' });
    send('UPDATE_MARKERS', body);
  };
  document.getElementById('clear-markers').onclick = () => send('UPDATE_MARKERS', { markers: [] });
  document.getElementById('send-center').onclick = () => send('MAP_CENTER_COORD_CHANGE', {
    mapCenterCoords: {
      lat: parseFloat(document.getElementById('lat').value),
      lng: parseFloat(document.getElementById('lng').value),
    },
  });
  document.getElementById('toggle-debug').onclick = () => {
    debugOn = !debugOn;
    send('SET_DEBUG', { showDebug: debugOn });
  };
</script>
</body>
</html>
"#;

pub async fn host_page() -> Html<&'static str> {
    Html(HOST_PAGE)
}

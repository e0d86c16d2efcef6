pub const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Pose Mirror</title>
  <style>
    body { font-family: sans-serif; background: #101418; color: #e8e8e8; margin: 2rem; }
    .panes { display: flex; gap: 2rem; align-items: flex-start; }
    .pane { text-align: center; }
    img { max-width: 480px; border: 1px solid #334; border-radius: 4px; }
    button { padding: 0.4rem 1.2rem; margin: 0.5rem; font-size: 1rem; cursor: pointer; }
    #reference-name { color: #9ab; }
  </style>
</head>
<body>
  <h1>Pose Mirror</h1>
  <div class="panes">
    <div class="pane">
      <h2>Reference</h2>
      <img id="reference" src="/reference.jpg" alt="reference pose">
      <p id="reference-name"></p>
      <div>
        <button onclick="navigate('/previous')">&laquo; Previous</button>
        <button onclick="navigate('/next')">Next &raquo;</button>
      </div>
    </div>
    <div class="pane">
      <h2>Live</h2>
      <img src="/video_feed" alt="live camera stream">
    </div>
  </div>
  <script>
    async function refresh(path) {
      const response = await fetch(path);
      const cursor = await response.json();
      document.getElementById('reference-name').textContent =
        `${cursor.name} (${cursor.index + 1}/${cursor.count})`;
      document.getElementById('reference').src = `/reference.jpg?i=${cursor.index}`;
    }
    function navigate(path) { refresh(path); }
    refresh('/current');
  </script>
</body>
</html>
"#;

//! Sample markup for tests and benchmarks.

/// Locator of [`SEARCH_PAGE`].
pub const SEARCH_LOCATOR: &str = "https://jp.mercari.com/search?keyword=film%20camera";

/// A search-results page with three listing cards.
pub const SEARCH_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>film camera - Search</title></head>
<body>
  <header><nav><a href="/">Home</a></nav></header>
  <main>
    <div data-testid="search-items" class="mer-list">
      <ul>
        <li data-testid="item-cell">
          <a href="/item/m10000000001">
            <img src="https://static.mercdn.net/thumb/item/m10000000001_1.jpg">
            <span data-testid="thumbnail-item-name">Nikon F3 film camera body</span>
            <span data-testid="thumbnail-item-price">¥12,000</span>
          </a>
        </li>
        <li data-testid="item-cell">
          <a href="/item/m10000000002">
            <img src="https://static.mercdn.net/thumb/item/m10000000002_1.jpg">
            <span data-testid="thumbnail-item-name">Canon AE-1 program with 50mm lens</span>
            <span data-testid="thumbnail-item-price">¥18,500</span>
          </a>
        </li>
        <li data-testid="item-cell">
          <a href="/item/m10000000003">
            <img src="https://static.mercdn.net/thumb/item/m10000000003_1.jpg">
            <span data-testid="thumbnail-item-name">ジャンク Pentax MX body</span>
            <span data-testid="thumbnail-item-price">¥3,000</span>
          </a>
        </li>
      </ul>
    </div>
  </main>
</body>
</html>"#;

/// [`SEARCH_PAGE`] after infinite scroll appended a fourth card.
pub const SEARCH_PAGE_WITH_MORE: &str = r#"<!DOCTYPE html>
<html>
<head><title>film camera - Search</title></head>
<body>
  <header><nav><a href="/">Home</a></nav></header>
  <main>
    <div data-testid="search-items" class="mer-list">
      <ul>
        <li data-testid="item-cell">
          <a href="/item/m10000000001">
            <img src="https://static.mercdn.net/thumb/item/m10000000001_1.jpg">
            <span data-testid="thumbnail-item-name">Nikon F3 film camera body</span>
            <span data-testid="thumbnail-item-price">¥12,000</span>
          </a>
        </li>
        <li data-testid="item-cell">
          <a href="/item/m10000000002">
            <img src="https://static.mercdn.net/thumb/item/m10000000002_1.jpg">
            <span data-testid="thumbnail-item-name">Canon AE-1 program with 50mm lens</span>
            <span data-testid="thumbnail-item-price">¥18,500</span>
          </a>
        </li>
        <li data-testid="item-cell">
          <a href="/item/m10000000003">
            <img src="https://static.mercdn.net/thumb/item/m10000000003_1.jpg">
            <span data-testid="thumbnail-item-name">ジャンク Pentax MX body</span>
            <span data-testid="thumbnail-item-price">¥3,000</span>
          </a>
        </li>
        <li data-testid="item-cell">
          <a href="/item/m10000000004">
            <img src="https://static.mercdn.net/thumb/item/m10000000004_1.jpg">
            <span data-testid="thumbnail-item-name">Olympus OM-1 black</span>
            <span data-testid="thumbnail-item-price">¥22,000</span>
          </a>
        </li>
      </ul>
    </div>
  </main>
</body>
</html>"#;

/// Locator of [`LISTING_PAGE`].
pub const LISTING_LOCATOR: &str = "https://jp.mercari.com/item/m98765432101";

/// A single-listing page.
pub const LISTING_PAGE: &str = r#"<!DOCTYPE html>
<html>
<body>
  <main>
    <div class="slick-list">
      <div class="slick-slide"><img src="https://static.mercdn.net/item/photo_1.jpg"></div>
      <div class="slick-slide"><img src="https://static.mercdn.net/item/photo_2.jpg"></div>
    </div>
    <div id="item-info">
      <div class="merHeading"><h1>Olympus OM-1 35mm film camera</h1></div>
      <div data-testid="price"><span>¥</span><span>18,500</span></div>
      <span data-testid="商品の状態">目立った傷や汚れなし</span>
      <pre data-testid="description">Shutter works at all speeds.</pre>
      <div class="merUserObject">
        <a data-location="item_details:seller_info" href="https://jp.mercari.com/user/424242">
          <p>camera_shop</p>
        </a>
      </div>
    </div>
  </main>
</body>
</html>"#;

/// Locator of [`TARGET_ITEM_PAGE`].
pub const TARGET_ITEM_LOCATOR: &str = "https://www.amazon.co.jp/dp/B000TEST01";

/// A target-market product page with a discounted price.
pub const TARGET_ITEM_PAGE: &str = r#"<!DOCTYPE html>
<html>
<body>
  <div id="corePrice">
    <span class="a-price"><span class="a-offscreen">￥24,800</span></span>
    <span class="a-price a-text-price"><span class="a-offscreen">￥31,000</span></span>
  </div>
</body>
</html>"#;
